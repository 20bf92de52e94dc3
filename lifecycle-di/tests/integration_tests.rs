//! Integration tests for the component container

use lifecycle_di::prelude::*;
use lifecycle_di::{
    ContainerRef, DenyList, Disposable, LifecycleState, RefCountedProvider, SingletonProvider,
    TransientProvider,
};
#[cfg(feature = "config")]
use lifecycle_di::{ContainerConfig, CycleDetection};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

// Test services
struct Logger {
    lines: Mutex<Vec<String>>,
}

impl Logger {
    fn new() -> Self {
        Self {
            lines: Mutex::new(Vec::new()),
        }
    }

    fn log(&self, message: &str) {
        self.lines.lock().push(message.to_string());
    }
}

struct Database {
    connection_string: String,
    logger: Arc<Logger>,
    closed: Arc<AtomicUsize>,
}

impl Disposable for Database {
    fn dispose(&self) {
        self.logger.log(&format!("closing {}", self.connection_string));
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

struct UserService {
    database: Arc<Database>,
}

impl UserService {
    fn describe(&self) -> String {
        format!("users@{}", self.database.connection_string)
    }
}

fn app_module(closed: Arc<AtomicUsize>) -> impl Fn(&mut ContainerBuilder) {
    move |builder: &mut ContainerBuilder| {
        builder.register_singleton("logger", |_| Ok(Logger::new()));
        let closed = closed.clone();
        builder.register_provider(
            "database",
            Arc::new(
                SingletonProvider::new(move |manager| {
                    let logger = manager.request_as::<Logger>("logger", None)?;
                    logger.log("connecting");
                    Ok(Database {
                        connection_string: "memory://test".to_string(),
                        logger,
                        closed: closed.clone(),
                    })
                })
                .disposing(),
            ),
        );
        builder.register_transient("users", |manager| {
            Ok(UserService {
                database: manager.request_as::<Database>("database", None)?,
            })
        });
    }
}

#[test]
fn test_module_wiring() {
    init_tracing();
    let closed = Arc::new(AtomicUsize::new(0));
    let container = ContainerBuilder::new("app")
        .add_module(app_module(closed.clone()))
        .start()
        .unwrap();

    let first = container.request_as::<UserService>("users", None).unwrap();
    let second = container.request_as::<UserService>("users", None).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first.database, &second.database));
    assert_eq!(first.describe(), "users@memory://test");

    let logger = container.request_as::<Logger>("logger", None).unwrap();
    assert_eq!(*logger.lines.lock(), vec!["connecting"]);

    // users -> database -> logger, with the singleton's subtree under its first requester
    let tree = container.dependency_tree();
    assert_eq!(tree.len(), 3);
    assert_eq!(tree[0].specification.as_str(), "users");
    assert_eq!(tree[0].dependencies[0].specification.as_str(), "database");
    assert_eq!(tree[0].dependencies[0].dependencies[0].specification.as_str(), "logger");
    assert!(tree[1].dependencies[0].dependencies.is_empty());

    container.stop().unwrap();
    assert_eq!(closed.load(Ordering::SeqCst), 1);
    assert_eq!(
        *logger.lines.lock(),
        vec!["connecting", "closing memory://test"]
    );

    let stats = container.stats();
    assert_eq!(stats.live_nodes, 1);
    assert_eq!(stats.shared_instances, 0);
}

#[test]
fn test_transient_release_runs_teardown() {
    init_tracing();
    let torn_down = Arc::new(AtomicUsize::new(0));
    let counter = torn_down.clone();

    let mut builder = Container::builder("transient");
    builder.register_provider(
        "buffer",
        Arc::new(
            TransientProvider::new(|_| Ok(vec![0u8; 16])).with_teardown(move |buffer| {
                counter.fetch_add(buffer.len(), Ordering::SeqCst);
            }),
        ),
    );
    let container = builder.start().unwrap();

    let buffer = container.request_as::<Vec<u8>>("buffer", None).unwrap();
    assert_eq!(container.release_component(&buffer), ReleaseOutcome::Released);
    assert_eq!(torn_down.load(Ordering::SeqCst), 16);
    assert_eq!(container.release_component(&buffer), ReleaseOutcome::Unknown);
    assert_eq!(torn_down.load(Ordering::SeqCst), 16);
}

#[test]
fn test_ref_counted_shared_across_requesters() {
    init_tracing();
    let pool = Arc::new(RefCountedProvider::new(|_| Ok(AtomicUsize::new(0))));

    let mut builder = Container::builder("pool");
    builder.register_provider("pool", pool.clone());
    builder.register_transient("client", |manager| {
        let pool = manager.request_as::<AtomicUsize>("pool", None)?;
        pool.fetch_add(1, Ordering::SeqCst);
        Ok(pool)
    });
    let container = builder.start().unwrap();

    let a = container.request_as::<Arc<AtomicUsize>>("client", None).unwrap();
    let b = container.request_as::<Arc<AtomicUsize>>("client", None).unwrap();
    assert!(Arc::ptr_eq(&*a, &*b));
    assert_eq!(a.load(Ordering::SeqCst), 2);
    assert_eq!(pool.holders("default"), 2);

    container.release_component(&a);
    assert_eq!(pool.holders("default"), 1);
    container.release_component(&b);
    assert_eq!(pool.holders("default"), 0);
    assert_eq!(container.stats().shared_instances, 0);
}

#[test]
fn test_cycle_error_reports_chain() {
    init_tracing();
    let mut builder = Container::builder("cyclic");
    builder.register_transient("left", |manager| {
        manager.request("right", None)?;
        Ok(())
    });
    builder.register_transient("right", |manager| {
        manager.request("left", None)?;
        Ok(())
    });
    let container = builder.start().unwrap();

    let err = container.request_component("left", None).unwrap_err();
    assert!(err.is_cycle());
    assert_eq!(
        err.to_string(),
        "Circular dependency detected: left[default] -> right[default] -> left[default]"
    );
    assert!(container.dependency_tree().is_empty());
}

#[cfg(feature = "config")]
#[test]
fn test_lenient_mode_from_config() {
    init_tracing();
    let config = ContainerConfig::from_toml(
        r#"
        name = "lenient"
        cycle_detection = "lenient"
        default_scope = "outer"
        "#,
    )
    .unwrap();

    let mut builder = ContainerBuilder::new("ignored").with_config(config);
    builder.register_transient("scoped", |manager| {
        if manager.scope_id() == "outer" {
            manager.request("scoped", Some("inner"))?;
        }
        Ok(manager.scope_id().to_string())
    });
    let container = builder.start().unwrap();
    assert_eq!(container.name(), "lenient");
    assert_eq!(container.config().cycle_detection, CycleDetection::Lenient);

    let outer = container.request_as::<String>("scoped", None).unwrap();
    assert_eq!(outer.as_str(), "outer");
    assert_eq!(container.dependency_tree()[0].dependencies[0].scope_id, "inner");

    // Same scope again is still a cycle.
    let mut builder = ContainerBuilder::new("lenient-again")
        .with_config(ContainerConfig::named("lenient-again").with_cycle_detection(CycleDetection::Lenient));
    builder.register_transient("looping", |manager| {
        manager.request("looping", None)?;
        Ok(())
    });
    let container = builder.start().unwrap();
    assert!(container.request_component("looping", None).unwrap_err().is_cycle());
}

#[test]
fn test_child_container_delegation() {
    init_tracing();
    let mut builder = Container::builder("platform").security(DenyList::new().deny("vault"));
    builder.register_singleton("clock", |_| Ok(42u64));
    builder.register_singleton("vault", |_| Ok("secret".to_string()));
    let platform = builder.start().unwrap();

    let mut builder = Container::builder("plugin").parent(&platform);
    builder.register_transient("task", |manager| {
        Ok(*manager.request_as::<u64>("clock", None)? + 1)
    });
    let plugin = builder.start().unwrap();

    assert_eq!(plugin.parent().map(|p| p.name()), Some("platform"));
    assert!(plugin.has_component("clock"));
    assert_eq!(*plugin.request_as::<u64>("task", None).unwrap(), 43);

    // The parent's policy vetoes requests made in the child.
    assert!(matches!(
        plugin.request_component("vault", None),
        Err(DiError::PermissionDenied { .. })
    ));

    // Each container exposes itself.
    let own = plugin.request_as::<ContainerRef>("container", None).unwrap();
    assert_eq!(own.name(), "plugin");

    plugin.stop().unwrap();
    assert!(platform.is_running());
    assert_eq!(*platform.request_as::<u64>("clock", None).unwrap(), 42);
    platform.stop().unwrap();
}

#[test]
fn test_lifecycle_hooks() {
    init_tracing();
    let events = Arc::new(Mutex::new(Vec::new()));
    let on_start = events.clone();
    let on_stop = events.clone();

    let container = Container::builder("hooked")
        .on_start(move |container: &Container| {
            on_start.lock().push(format!("start {}", container.lifecycle_state()));
            Ok(())
        })
        .on_stop(move |container: &Container| {
            on_stop.lock().push(format!("stop {}", container.lifecycle_state()));
            Ok(())
        })
        .build()
        .unwrap();

    assert_eq!(container.lifecycle_state(), LifecycleState::Created);
    container.start().unwrap();
    container.stop().unwrap();
    assert!(matches!(container.stop(), Err(DiError::AlreadyStopped { .. })));
    assert_eq!(*events.lock(), vec!["start Running", "stop Stopped"]);
}

#[test]
fn test_failed_factory_releases_acquired_dependencies() {
    init_tracing();
    let torn_down = Arc::new(AtomicUsize::new(0));
    let counter = torn_down.clone();

    let mut builder = Container::builder("failing");
    builder.register_provider(
        "connection",
        Arc::new(TransientProvider::new(|_| Ok(1u8)).with_teardown(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })),
    );
    builder.register_transient("service", |manager| -> DiResult<u8> {
        manager.request("connection", None)?;
        Err(DiError::creation_failed(manager.specification(), "misconfigured"))
    });
    let container = builder.start().unwrap();

    let err = container.request_component("service", None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to create component service: misconfigured"
    );
    assert_eq!(torn_down.load(Ordering::SeqCst), 1);
    assert_eq!(container.stats().live_nodes, 1);
}
