//! Query instrumentation
//!
//! A [`TraceContext`] holds a stack of scopes opened with
//! [`TraceContext::verbose`] and [`TraceContext::log_to`]. Each scope is
//! removed when its guard drops, so the previous state comes back on every
//! exit path, including early returns and panics. While verbose, every
//! statement a backend executes is handed to the active callbacks before
//! the engine runs it, or logged through `tracing` when none are
//! registered.

use lazy_static::lazy_static;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::info;

pub type QueryCallback = Arc<dyn Fn(&str) + Send + Sync>;

enum Frame {
    Verbose(bool),
    Log(QueryCallback),
}

struct Entry {
    id: u64,
    frame: Frame,
}

struct TraceState {
    default_verbose: bool,
    next_id: u64,
    frames: Vec<Entry>,
}

lazy_static! {
    static ref GLOBAL_TRACE: TraceContext = TraceContext::with_default(verbose_from_env());
}

fn verbose_from_env() -> bool {
    std::env::var("TABLEXPR_VERBOSE")
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[derive(Clone)]
pub struct TraceContext {
    state: Arc<Mutex<TraceState>>,
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TraceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TraceContext")
            .field("default_verbose", &state.default_verbose)
            .field("scopes", &state.frames.len())
            .finish()
    }
}

impl TraceContext {
    /// A private context, not verbose until a scope says otherwise
    pub fn new() -> Self {
        Self::with_default(false)
    }

    pub fn with_default(verbose: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(TraceState {
                default_verbose: verbose,
                next_id: 0,
                frames: Vec::new(),
            })),
        }
    }

    /// The process-wide context; its default follows `TABLEXPR_VERBOSE`
    pub fn global() -> TraceContext {
        GLOBAL_TRACE.clone()
    }

    /// Set the verbose flag until the returned guard drops
    pub fn verbose(&self, enabled: bool) -> TraceScope {
        self.push(Frame::Verbose(enabled))
    }

    /// Register a statement callback until the returned guard drops
    pub fn log_to<F>(&self, callback: F) -> TraceScope
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.push(Frame::Log(Arc::new(callback)))
    }

    pub fn is_verbose(&self) -> bool {
        let state = self.state.lock();
        Self::effective_verbose(&state)
    }

    /// Callbacks of every active scope, outermost first
    pub fn callbacks(&self) -> Vec<QueryCallback> {
        let state = self.state.lock();
        Self::active_callbacks(&state)
    }

    /// Report a statement about to run
    pub fn record(&self, sql: &str) {
        let (verbose, callbacks) = {
            let state = self.state.lock();
            (Self::effective_verbose(&state), Self::active_callbacks(&state))
        };
        if !verbose {
            return;
        }
        if callbacks.is_empty() {
            info!(target: "tablexpr::query", "{}", sql);
            return;
        }
        for callback in callbacks {
            callback(sql);
        }
    }

    fn push(&self, frame: Frame) -> TraceScope {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.frames.push(Entry { id, frame });
        TraceScope {
            context: self.clone(),
            id,
        }
    }

    fn effective_verbose(state: &TraceState) -> bool {
        state
            .frames
            .iter()
            .rev()
            .find_map(|e| match e.frame {
                Frame::Verbose(v) => Some(v),
                Frame::Log(_) => None,
            })
            .unwrap_or(state.default_verbose)
    }

    fn active_callbacks(state: &TraceState) -> Vec<QueryCallback> {
        state
            .frames
            .iter()
            .filter_map(|e| match &e.frame {
                Frame::Log(cb) => Some(cb.clone()),
                Frame::Verbose(_) => None,
            })
            .collect()
    }
}

/// Guard of an open trace scope
#[must_use = "the scope closes as soon as the guard is dropped"]
pub struct TraceScope {
    context: TraceContext,
    id: u64,
}

impl Drop for TraceScope {
    fn drop(&mut self) {
        let mut state = self.context.state.lock();
        state.frames.retain(|e| e.id != self.id);
    }
}
