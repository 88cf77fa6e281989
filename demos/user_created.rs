use std::sync::Arc;

use async_trait::async_trait;
use herald::{Error, Event, EventBus, Listener, Result, listener};

// The payload a producer attaches to "user.created" events.
#[derive(Debug, Clone)]
struct UserCreated {
    id: u64,
    email: String,
}

// A handler type: sends a welcome mail when an account appears.
struct WelcomeMailer;

#[async_trait]
impl Listener for WelcomeMailer {
    async fn handle(&self, event: &Event) -> Result<()> {
        let user = event
            .payload_as::<UserCreated>()
            .ok_or_else(|| Error::listener("unexpected payload"))?;
        println!("sending welcome mail to {} (user #{})", user.email, user.id);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let bus = EventBus::new();

    // Subscribe a handler type and an async closure to the same name.
    bus.register("user.created", Arc::new(WelcomeMailer));
    let audit = bus.register(
        "user.created",
        listener::from_fn(|event| async move {
            println!("audit: {} raised", event.name());
            Ok(())
        }),
    );

    // A producer raises the event; both listeners run, in registration order.
    bus.raise(
        "user.created",
        UserCreated {
            id: 42,
            email: "jo@example.com".into(),
        },
    )
    .await?;

    // Tear down the audit subscription; later events skip it.
    bus.unregister("user.created", audit);
    bus.raise(
        "user.created",
        UserCreated {
            id: 43,
            email: "sam@example.com".into(),
        },
    )
    .await?;

    Ok(())
}
