mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::{RecordingTransport, message};
use parking_lot::Mutex;
use switchboard_framework::{
    BoxError, Command, CommandSettings, Context, DispatchFailure, HelpCommand, Middleware, Mux,
    MuxBuilder, Outcome, SimpleCommand, TraceLayer,
};

type Journal = Arc<Mutex<Vec<String>>>;

struct Recorded {
    journal: Journal,
}

#[async_trait]
impl Command for Recorded {
    fn settings(&self) -> CommandSettings {
        CommandSettings::new("run", "Records its invocation")
    }

    async fn handle(&self, _ctx: &Context) -> Result<(), BoxError> {
        self.journal.lock().push("handler".to_string());
        Ok(())
    }
}

struct Broken;

#[async_trait]
impl Command for Broken {
    fn settings(&self) -> CommandSettings {
        CommandSettings::new("broken", "Fails")
    }

    async fn handle(&self, _ctx: &Context) -> Result<(), BoxError> {
        Err("bad gateway".into())
    }
}

fn tagging(journal: &Journal, tag: &'static str) -> Middleware {
    let journal = Arc::clone(journal);
    Middleware::from_fn(move |ctx, next| {
        let journal = Arc::clone(&journal);
        async move {
            journal.lock().push(format!("{tag}.pre"));
            let result = next.run(ctx).await;
            journal.lock().push(format!("{tag}.post"));
            result
        }
    })
}

#[tokio::test]
async fn test_middleware_runs_in_registration_order() {
    let journal = Journal::default();
    let mut builder = MuxBuilder::new("!").unwrap();
    builder.use_middleware(tagging(&journal, "a"));
    builder.use_middleware(tagging(&journal, "b"));
    builder
        .register(Recorded {
            journal: Arc::clone(&journal),
        })
        .unwrap();
    let mux = builder.initialize().await.unwrap();

    let transport = RecordingTransport::new();
    let outcome = mux
        .handle(message("alice", &[], "!run"), transport.boxed())
        .await;

    assert!(outcome.is_completed());
    assert_eq!(
        *journal.lock(),
        vec!["a.pre", "b.pre", "handler", "b.post", "a.post"]
    );
}

#[tokio::test]
async fn test_middleware_can_short_circuit() {
    let journal = Journal::default();
    let mut builder = MuxBuilder::new("!").unwrap();
    builder.use_middleware(Middleware::from_fn(|ctx: Arc<Context>, next| async move {
        if ctx.author().id == "mallory" {
            return Ok(());
        }
        next.run(ctx).await
    }));
    builder
        .register(Recorded {
            journal: Arc::clone(&journal),
        })
        .unwrap();
    let mux = builder.initialize().await.unwrap();
    let transport = RecordingTransport::new();

    mux.handle(message("mallory", &[], "!run"), transport.boxed())
        .await;
    assert!(journal.lock().is_empty());

    mux.handle(message("alice", &[], "!run"), transport.boxed())
        .await;
    assert_eq!(*journal.lock(), vec!["handler"]);
}

#[tokio::test]
async fn test_middleware_observes_handler_error() {
    let seen = Arc::new(Mutex::new(None::<String>));
    let observer = {
        let seen = Arc::clone(&seen);
        Middleware::from_fn(move |ctx, next| {
            let seen = Arc::clone(&seen);
            async move {
                let result = next.run(ctx).await;
                if let Err(e) = &result {
                    *seen.lock() = Some(e.to_string());
                }
                result
            }
        })
    };

    let mut builder = MuxBuilder::new("!").unwrap();
    builder.use_middleware(Middleware::layer(TraceLayer));
    builder.use_middleware(observer);
    builder.register(Broken).unwrap();
    let mux = builder.initialize().await.unwrap();
    let transport = RecordingTransport::new();

    let outcome = mux
        .handle(message("alice", &[], "!broken"), transport.boxed())
        .await;

    assert_eq!(seen.lock().as_deref(), Some("bad gateway"));
    assert!(matches!(
        outcome,
        Outcome::Failed {
            failure: DispatchFailure::Handler(_),
            ..
        }
    ));
}

// ─── Help ─────────────────────────────────────────────────────────────────────

struct Wiki;

#[async_trait]
impl Command for Wiki {
    fn settings(&self) -> CommandSettings {
        CommandSettings::new("wiki", "Search the wiki")
    }

    async fn handle(&self, _ctx: &Context) -> Result<(), BoxError> {
        Ok(())
    }

    async fn handle_help(&self, ctx: &Context) -> bool {
        ctx.reply("Usage: !wiki <query>").await.is_ok()
    }
}

struct Names {
    seen: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Command for Names {
    fn settings(&self) -> CommandSettings {
        CommandSettings::new("names", "Lists commands")
    }

    async fn init(&self, mux: &Mux) -> Result<(), BoxError> {
        *self.seen.lock() = mux.command_names().iter().map(|n| n.to_string()).collect();
        Ok(())
    }

    async fn handle(&self, _ctx: &Context) -> Result<(), BoxError> {
        Ok(())
    }
}

async fn help_mux() -> Mux {
    let mut builder = MuxBuilder::new("!").unwrap();
    builder.register(Wiki).unwrap();
    builder
        .register_simple(SimpleCommand::new(
            "rules",
            "Be nice.",
            "This is a simple command",
        ))
        .unwrap();
    builder.register(HelpCommand::default()).unwrap();
    builder.initialize().await.unwrap()
}

#[tokio::test]
async fn test_help_lists_every_command_once_in_order() {
    let mux = help_mux().await;
    let transport = RecordingTransport::new();

    mux.handle(message("alice", &[], "!help"), transport.boxed())
        .await;

    let texts = transport.texts();
    assert_eq!(texts.len(), 1);
    assert_eq!(
        texts[0],
        "`!wiki`: Search the wiki\n`!rules`: This is a simple command\n`!help`: Displays help information"
    );
}

#[tokio::test]
async fn test_help_prefers_custom_help() {
    let mux = help_mux().await;
    let transport = RecordingTransport::new();

    mux.handle(message("alice", &[], "!help wiki"), transport.boxed())
        .await;

    assert_eq!(transport.texts(), vec!["Usage: !wiki <query>".to_string()]);
}

#[tokio::test]
async fn test_help_falls_back_to_static_text() {
    let mux = help_mux().await;
    let transport = RecordingTransport::new();

    mux.handle(message("alice", &[], "!help rules"), transport.boxed())
        .await;

    assert_eq!(
        transport.texts(),
        vec!["`!rules`: This is a simple command".to_string()]
    );
}

#[tokio::test]
async fn test_help_for_unknown_command() {
    let mux = help_mux().await;
    let transport = RecordingTransport::new();

    mux.handle(message("alice", &[], "!help nope"), transport.boxed())
        .await;

    assert_eq!(transport.texts(), vec!["Command not found.".to_string()]);
}

#[tokio::test]
async fn test_init_sees_full_registry() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut builder = MuxBuilder::new("!").unwrap();
    builder
        .register(Names {
            seen: Arc::clone(&seen),
        })
        .unwrap();
    builder.register(HelpCommand::default()).unwrap();
    builder.initialize().await.unwrap();

    assert_eq!(*seen.lock(), vec!["names", "help"]);
}

struct Startup {
    name: &'static str,
    journal: Journal,
}

#[async_trait]
impl Command for Startup {
    fn settings(&self) -> CommandSettings {
        CommandSettings::new(self.name, "Records its init")
    }

    async fn init(&self, _mux: &Mux) -> Result<(), BoxError> {
        self.journal.lock().push(self.name.to_string());
        Ok(())
    }

    async fn handle(&self, _ctx: &Context) -> Result<(), BoxError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_init_runs_once_per_rich_command_in_order() {
    let journal = Journal::default();
    let mut builder = MuxBuilder::new("!").unwrap();
    for name in ["zeta", "alpha"] {
        builder
            .register(Startup {
                name,
                journal: Arc::clone(&journal),
            })
            .unwrap();
    }
    builder
        .register_simple(SimpleCommand::new("rules", "Be nice.", "Server rules"))
        .unwrap();
    builder
        .register(Startup {
            name: "mid",
            journal: Arc::clone(&journal),
        })
        .unwrap();

    let mux = builder.initialize().await.unwrap();
    assert_eq!(*journal.lock(), vec!["zeta", "alpha", "mid"]);

    let transport = RecordingTransport::new();
    mux.handle(message("alice", &[], "!alpha"), transport.boxed())
        .await;
    assert_eq!(journal.lock().len(), 3);
}
