//! Opaque completion tokens
//!
//! A token is what crosses the boundary in place of a reference to the
//! waiting future. It is a registry key, not a pointer: the native side hands
//! its bits back untouched, and the dispatcher looks the waiting future up in
//! the global [`TokenRegistry`]. Removing the entry is the only way to
//! complete a call, so exactly one remover ever wins.

use crate::native::FreeStringFn;
use asyncffi_core::{BridgeError, BridgeResult};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::ffi::c_void;
use std::future::Future;
use std::num::NonZeroU64;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Global token registry
static TOKEN_REGISTRY: OnceCell<TokenRegistry> = OnceCell::new();

/// Identifier of one in-flight call
///
/// Never zero, so a null token pointer is never a valid token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompletionToken(NonZeroU64);

impl CompletionToken {
    /// The raw identifier
    pub fn id(self) -> u64 {
        self.0.get()
    }

    /// The value handed to native code
    pub fn as_ptr(self) -> *mut c_void {
        std::ptr::without_provenance_mut(self.0.get() as usize)
    }

    /// Recover a token from the value native code handed back
    ///
    /// Returns `None` for null.
    pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
        NonZeroU64::new(ptr.addr() as u64).map(Self)
    }
}

impl std::fmt::Display for CompletionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registry entry for a call that has not completed yet
pub struct PendingToken {
    sender: oneshot::Sender<BridgeResult<String>>,
    free: FreeStringFn,
    owner: u64,
}

impl PendingToken {
    /// Free function for output buffers delivered with this token
    pub fn free_fn(&self) -> FreeStringFn {
        self.free
    }

    /// The lifecycle that issued this token
    pub fn owner(&self) -> u64 {
        self.owner
    }

    /// Resolve the waiting future
    ///
    /// Returns `false` if the future was dropped before completion.
    pub fn resolve(self, outcome: BridgeResult<String>) -> bool {
        self.sender.send(outcome).is_ok()
    }
}

/// Maps tokens to the futures waiting on them
pub struct TokenRegistry {
    tokens: DashMap<u64, PendingToken>,
    next_id: AtomicU64,
}

impl TokenRegistry {
    /// Create a new registry
    pub fn new() -> Self {
        Self {
            tokens: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Get the global registry
    pub fn global() -> &'static TokenRegistry {
        TOKEN_REGISTRY.get_or_init(TokenRegistry::new)
    }

    /// Register a new call and return its token and future
    ///
    /// `free` releases output buffers delivered for this call; `owner`
    /// identifies the lifecycle that may drain it on shutdown.
    pub fn register(&self, free: FreeStringFn, owner: u64) -> (CompletionToken, PendingCompletion) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let token = match NonZeroU64::new(id) {
            Some(id) => CompletionToken(id),
            // Wrapping a u64 counter is not a practical concern
            None => unreachable!("token counter wrapped"),
        };

        let (sender, receiver) = oneshot::channel();
        self.tokens.insert(
            id,
            PendingToken {
                sender,
                free,
                owner,
            },
        );

        (
            token,
            PendingCompletion {
                token: Some(token),
                receiver,
            },
        )
    }

    /// Remove a token, releasing it
    ///
    /// Returns `None` if the token was already released or never issued.
    pub fn take(&self, token: CompletionToken) -> Option<PendingToken> {
        self.tokens.remove(&token.id()).map(|(_, pending)| pending)
    }

    /// Check whether a token is still waiting for its completion
    pub fn contains(&self, token: CompletionToken) -> bool {
        self.tokens.contains_key(&token.id())
    }

    /// Resolve every token issued by `owner` with `error`
    ///
    /// Returns the number of tokens released.
    pub fn drain_owned_by(&self, owner: u64, error: &BridgeError) -> usize {
        let ids: Vec<u64> = self
            .tokens
            .iter()
            .filter(|entry| entry.value().owner == owner)
            .map(|entry| *entry.key())
            .collect();

        let mut drained = 0;
        for id in ids {
            // A dispatcher may have won the race since the scan
            if let Some((_, pending)) = self.tokens.remove(&id) {
                pending.resolve(Err(error.clone()));
                drained += 1;
            }
        }
        drained
    }

    /// Number of outstanding tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if no token is outstanding
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Future for the outcome of one native call
///
/// Resolves exactly once: with the delivered result or error, with
/// [`BridgeError::NativeCallRejected`] if the call was refused, or with
/// [`BridgeError::RuntimeShutdownError`] if the runtime went away first.
#[must_use = "futures do nothing unless awaited"]
pub struct PendingCompletion {
    token: Option<CompletionToken>,
    receiver: oneshot::Receiver<BridgeResult<String>>,
}

impl PendingCompletion {
    /// A future that is already resolved and owns no token
    pub fn ready(outcome: BridgeResult<String>) -> Self {
        let (sender, receiver) = oneshot::channel();
        let _ = sender.send(outcome);
        Self {
            token: None,
            receiver,
        }
    }

    /// The token this future waits on, if any
    pub fn token(&self) -> Option<CompletionToken> {
        self.token
    }
}

impl Future for PendingCompletion {
    type Output = BridgeResult<String>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(BridgeError::Internal(
                    "completion dropped without a result".to_string(),
                ))
            })
        })
    }
}
