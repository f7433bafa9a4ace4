/// Messages exchanged between the content script, popup and background
///
/// Every request gets at most one reply. The background answers through a
/// [`ReplySlot`], which is consumed when completed; the requesting side (or
/// the listener glue) waits on the matching [`PendingReply`].

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Settings;
use crate::error::VerifyError;

/// A message sent to the background coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    VerifyClaim {
        text: String,
        #[serde(default)]
        url: Option<String>,
    },
    GetSettings,
}

/// Reply to `verifyClaim`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerificationResponse {
    pub fn ok(result: Value) -> Self {
        VerificationResponse {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        VerificationResponse {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

impl From<Result<Value, VerifyError>> for VerificationResponse {
    fn from(outcome: Result<Value, VerifyError>) -> Self {
        match outcome {
            Ok(payload) => VerificationResponse::ok(payload),
            Err(e) => VerificationResponse::failed(e.to_string()),
        }
    }
}

/// Anything the background can send back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Verification(VerificationResponse),
    Settings(Settings),
}

/// A context-menu click as delivered by `chrome.contextMenus.onClicked`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuClick {
    #[serde(default)]
    pub menu_item_id: String,
    #[serde(default)]
    pub selection_text: Option<String>,
    /// Filled from the tab argument, not the click info
    #[serde(skip)]
    pub tab_url: Option<String>,
}

/// Create the two ends of a one-shot reply channel
pub fn reply_channel() -> (ReplySlot, PendingReply) {
    let (tx, rx) = oneshot::channel();
    (ReplySlot { tx: Some(tx) }, PendingReply { rx })
}

/// Producer half; completing it consumes it
pub struct ReplySlot {
    tx: Option<oneshot::Sender<Reply>>,
}

impl ReplySlot {
    pub fn complete(mut self, reply: Reply) {
        if let Some(tx) = self.tx.take() {
            if tx.send(reply).is_err() {
                log::warn!("Requester went away before the reply arrived; reply dropped");
            }
        }
    }
}

impl Drop for ReplySlot {
    fn drop(&mut self) {
        if self.tx.is_some() {
            log::error!("Reply slot dropped without a reply");
        }
    }
}

/// Consumer half; resolves to `None` if the slot was dropped uncompleted
pub struct PendingReply {
    rx: oneshot::Receiver<Reply>,
}

impl Future for PendingReply {
    type Output = Option<Reply>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(Result::ok)
    }
}
