use std::sync::{Arc, OnceLock};

use minject::container::{ContainerExt, DefaultContainer};
use minject::error::Error;
use minject::injector::MethodInjector;
use minject::key::ComponentKey;
use minject::monitor::TracingMonitor;
use minject::provider::Provider;
use minject::scope::Scope;
use minject::statics::StaticsRegistry;
use minject::target::{InjectionTarget, ParamSpec};

#[derive(Debug)]
struct DatabaseUrl(&'static str);

#[derive(Debug)]
struct Greeting(String);

#[derive(Debug, Default)]
struct UserService {
    database: Option<Arc<DatabaseUrl>>,
    greeting: Option<Arc<Greeting>>,
}

/// Holds process-wide settings filled in by static injection.
struct Settings;

static SETTINGS_DATABASE: OnceLock<String> = OnceLock::new();

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let container = DefaultContainer::root();
    container.register(Provider::instance(DatabaseUrl("postgres://localhost/app")))?;
    container.register(Provider::transient(|_| Ok(Greeting("Hello from minject".to_string()))).named("greeting"))?;

    let users = MethodInjector::builder(ComponentKey::of::<UserService>())
        .constructor(|_| Ok(UserService::default()))
        .monitor(Arc::new(TracingMonitor))
        .scope(Scope::Singleton)
        .target(InjectionTarget::instance(
            "set_database",
            vec![ParamSpec::of::<DatabaseUrl>()],
            |service: &mut UserService, args| {
                service.database = Some(args.get::<DatabaseUrl>(0)?);
                Ok(())
            },
        ))
        .target(InjectionTarget::instance(
            "set_greeting",
            vec![ParamSpec::of::<Greeting>().named("greeting")],
            |service: &mut UserService, args| {
                service.greeting = Some(args.get::<Greeting>(0)?);
                Ok(())
            },
        ))
        .build()?;
    println!("Registered {}", users.descriptor());
    container.register(users)?;

    let settings = MethodInjector::<Settings>::builder(ComponentKey::of::<Settings>())
        .monitor(Arc::new(TracingMonitor))
        .target(InjectionTarget::static_on::<Settings, _>(
            "configure",
            vec![ParamSpec::of::<DatabaseUrl>()],
            |args| {
                let url = args.get::<DatabaseUrl>(0)?;
                SETTINGS_DATABASE
                    .set(url.0.to_string())
                    .map_err(|_| "settings configured twice")?;
                Ok(())
            },
        ))
        .build()?;
    println!("Registered {}", settings.descriptor());
    container.add_static_injector(Arc::new(settings));

    let statics = StaticsRegistry::new();
    container.inject_statics(&statics)?;
    // A second pass finds the target already initialized.
    container.inject_statics(&statics)?;

    let service = container.resolve::<UserService>()?;
    println!("UserService: {:?}", service);
    println!("Settings database: {:?}", SETTINGS_DATABASE.get());
    println!("Initialized statics: {:?}", statics.initialized());

    Ok(())
}
