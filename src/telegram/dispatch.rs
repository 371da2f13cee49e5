//! Inbound update dispatch.
//!
//! Single-operator authorization happens here, before anything reaches
//! the router: traffic from any other chat is dropped silently (no
//! reply reveals the bot exists) and logged as a security event.

use std::sync::Arc;

use teloxide::dispatching::UpdateHandler;
use teloxide::{dptree, prelude::*};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bridge::router::{Command, Router};
use crate::telegram::OutboundMessage;

/// The single chat id allowed to drive the session.
#[derive(Debug, Clone, Copy)]
struct AuthorizedChat(i64);

/// Run the Telegram long-polling dispatcher until cancellation.
///
/// Both fresh and edited messages are handled: the operator editing a
/// sent message counts as new input, matching client behavior where a
/// quick fix-up resends the command.
pub async fn run(
    bot: Bot,
    router: Arc<Router>,
    outbound: mpsc::Sender<OutboundMessage>,
    authorized_chat: i64,
    cancel: CancellationToken,
) {
    let mut dispatcher = Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![
            router,
            outbound,
            AuthorizedChat(authorized_chat)
        ])
        .default_handler(|_| async {})
        .build();

    info!("telegram dispatcher started");
    tokio::select! {
        () = cancel.cancelled() => info!("telegram dispatcher cancelled"),
        () = dispatcher.dispatch() => warn!("telegram dispatcher exited"),
    }
}

/// Update routing tree: fresh and edited messages share one endpoint.
fn schema() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_edited_message().endpoint(on_message))
}

async fn on_message(
    msg: Message,
    router: Arc<Router>,
    outbound: mpsc::Sender<OutboundMessage>,
    authorized: AuthorizedChat,
) -> ResponseResult<()> {
    handle_update(&msg, &router, &outbound, authorized.0).await;
    respond(())
}

async fn handle_update(
    msg: &Message,
    router: &Router,
    outbound: &mpsc::Sender<OutboundMessage>,
    authorized_chat: i64,
) {
    if !is_authorized(msg.chat.id.0, authorized_chat) {
        warn!(
            chat_id = msg.chat.id.0,
            "dropping message from unauthorized chat"
        );
        return;
    }
    let Some(text) = msg.text() else {
        return;
    };
    let Some(command) = Command::parse(text) else {
        debug!(text, "ignoring unrecognized command");
        return;
    };
    for reply in router.handle(command).await {
        if outbound.send(reply).await.is_err() {
            warn!("outbound queue closed; dropping reply");
            return;
        }
    }
}

/// Exactly one chat may drive the session.
const fn is_authorized(chat_id: i64, authorized_chat: i64) -> bool {
    chat_id == authorized_chat
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::ops::ControlFlow;

    use super::*;
    use crate::bridge::session::Session;
    use crate::config::GlobalConfig;
    use crate::i18n::Lang;

    #[test]
    fn only_the_configured_chat_is_authorized() {
        assert!(is_authorized(42, 42));
        assert!(!is_authorized(43, 42));
        assert!(!is_authorized(0, 42));
        assert!(!is_authorized(-42, 42));
    }

    fn test_router() -> Arc<Router> {
        let config = GlobalConfig::from_toml_str("[telegram]\nchat_id = 42\n").unwrap();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        Arc::new(Router::new(Arc::new(Session::new(config, tx)), Lang::En))
    }

    fn message_update(kind: &str, text: &str) -> Update {
        let json = format!(
            r#"{{"update_id":1,"{kind}":{{"message_id":7,"date":1700000000,"chat":{{"id":42,"type":"private"}},"text":"{text}"}}}}"#
        );
        serde_json::from_str(&json).unwrap()
    }

    async fn dispatch_for_reply(update: Update) -> Option<OutboundMessage> {
        let (out_tx, mut out_rx) = mpsc::channel(8);
        let deps = dptree::deps![update, test_router(), out_tx, AuthorizedChat(42)];
        let outcome = schema().dispatch(deps).await;
        assert!(matches!(outcome, ControlFlow::Break(Ok(()))));
        out_rx.try_recv().ok()
    }

    #[tokio::test]
    async fn fresh_messages_reach_the_router() {
        let reply = dispatch_for_reply(message_update("message", "/mode")).await;
        assert!(reply.unwrap().text.contains("Streaming"));
    }

    #[tokio::test]
    async fn edited_messages_reach_the_router() {
        let reply = dispatch_for_reply(message_update("edited_message", "/mode")).await;
        assert!(reply.unwrap().text.contains("Streaming"));
    }
}
