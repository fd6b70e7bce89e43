//! Pluggable hooks around argument resolution.
//!
//! An [`InjectionPolicy`] may rewrite the per-position strategies right before
//! resolution (key substitution) and chooses the strategy used for positions
//! left without one.

use std::fmt;
use std::sync::Arc;

use crate::key::ComponentKey;
use crate::parameter::{ComponentParameter, KeyedParameter, Parameter};
use crate::target::{ParamSpec, TargetId};

/// The injection method whose arguments are being resolved.
#[derive(Clone, Copy, Debug)]
pub struct Member<'a> {
    pub id: &'a TargetId,
    pub params: &'a [ParamSpec],
}

/// Strategies for each argument position; `None` falls back to the default.
pub type ParameterSlots = Vec<Option<Arc<dyn Parameter>>>;

pub trait InjectionPolicy: Send + Sync {
    /// Rewrites the strategies before resolution. Must keep one slot per parameter.
    fn intercept_parameters(&self, current: ParameterSlots, _member: &Member<'_>) -> ParameterSlots {
        current
    }

    /// Strategy for positions nobody configured.
    fn default_parameter(&self) -> Arc<dyn Parameter> {
        Arc::new(ComponentParameter)
    }
}

/// Substitutes the lookup key of qualified parameters.
///
/// A parameter declared with [`ParamSpec::qualified`] and no explicit override
/// is looked up under the qualifier name instead of its type.
#[derive(Clone, Copy, Debug, Default)]
pub struct QualifierPolicy;

impl InjectionPolicy for QualifierPolicy {
    fn intercept_parameters(&self, current: ParameterSlots, member: &Member<'_>) -> ParameterSlots {
        current
            .into_iter()
            .zip(member.params)
            .map(|(slot, formal)| match (slot, formal.qualifier()) {
                (None, Some(qualifier)) => Some(Arc::new(KeyedParameter::new(ComponentKey::named(qualifier)))
                    as Arc<dyn Parameter>),
                (slot, _) => slot,
            })
            .collect()
    }
}

impl fmt::Debug for dyn InjectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<dyn InjectionPolicy>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::TypeKey;
    use crate::parameter::ConstantParameter;

    struct Repo;

    #[test]
    fn default_policy_keeps_slots() {
        struct Plain;
        impl InjectionPolicy for Plain {}

        let id = TargetId::new(TypeKey::of::<Repo>(), "bind");
        let params = vec![ParamSpec::of::<u8>().qualified("ignored")];
        let member = Member { id: &id, params: &params };

        let slots = Plain.intercept_parameters(vec![None], &member);
        assert!(slots[0].is_none());
        assert!(format!("{:?}", Plain.default_parameter()).contains("ComponentParameter"));
    }

    #[test]
    fn qualifier_policy_substitutes_unset_slots() {
        let id = TargetId::new(TypeKey::of::<Repo>(), "bind");
        let params = vec![
            ParamSpec::of::<String>().qualified("primary"),
            ParamSpec::of::<String>().qualified("replica"),
            ParamSpec::of::<u32>(),
        ];
        let member = Member { id: &id, params: &params };
        let explicit: Arc<dyn Parameter> = Arc::new(ConstantParameter::new("fixed".to_string()));

        let slots = QualifierPolicy.intercept_parameters(vec![None, Some(explicit), None], &member);

        assert_eq!(slots.len(), 3);
        assert!(format!("{:?}", slots[0]).contains("primary"));
        assert!(format!("{:?}", slots[1]).contains("ConstantParameter"));
        assert!(slots[2].is_none());
    }
}
