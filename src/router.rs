//! Request router
//!
//! Classifies every intercepted fetch and picks at most one strategy.
//! First match wins:
//!
//! 1. non-GET → pass-through
//! 2. navigation mode or an HTML accept header → navigation strategy
//! 3. same-origin style/script/image/font → static asset strategy
//! 4. anything else → pass-through

use crate::http::{Destination, Method, Request, RequestMode};
use crate::strategy::{Served, Strategy, StrategyContext};
use futures_util::future::BoxFuture;
use std::fmt;
use tracing::debug;
use url::{Origin, Url};

/// Why a request was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
    /// Mutating and other non-GET methods keep default network behavior
    NotGet,
    CrossOrigin,
    /// Not a document and not a static asset type
    Unhandled,
    /// No activated worker controls the page yet
    NotControlled,
}

impl fmt::Display for PassReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotGet => write!(f, "non-GET request"),
            Self::CrossOrigin => write!(f, "cross-origin asset"),
            Self::Unhandled => write!(f, "unhandled destination"),
            Self::NotControlled => write!(f, "worker not activated"),
        }
    }
}

/// Routing decision for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Intercept(Strategy),
    PassThrough(PassReason),
}

/// Pending strategy result
pub type ResponseFuture = BoxFuture<'static, Option<Served>>;

/// What the host should do with an intercepted fetch
pub enum Dispatch {
    /// Let the request continue to the network untouched
    PassThrough(PassReason),
    /// Respond with the result of a strategy
    Respond {
        strategy: Strategy,
        response: ResponseFuture,
    },
}

/// Check whether `url` has exactly the given origin.
/// Unparseable URLs are never same-origin.
pub fn same_origin(url: &str, origin: &Origin) -> bool {
    Url::parse(url).is_ok_and(|u| u.origin() == *origin)
}

/// Classify a request against the worker's origin
pub fn classify(request: &Request, origin: &Origin) -> Route {
    if request.method != Method::Get {
        return Route::PassThrough(PassReason::NotGet);
    }

    if request.mode == RequestMode::Navigate || request.accepts_html() {
        return Route::Intercept(Strategy::NetworkFirstWithFallback);
    }

    if !request.destination.is_static_asset() {
        return Route::PassThrough(PassReason::Unhandled);
    }
    if !same_origin(&request.url, origin) {
        return Route::PassThrough(PassReason::CrossOrigin);
    }

    if request.destination == Destination::Script {
        Route::Intercept(Strategy::ScriptNetworkFirst)
    } else {
        Route::Intercept(Strategy::CacheFirstWithRefresh)
    }
}

/// Routes intercepted requests to strategies
#[derive(Clone)]
pub struct Router {
    ctx: StrategyContext,
}

impl Router {
    pub fn new(ctx: StrategyContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &StrategyContext {
        &self.ctx
    }

    /// Decide how to handle a request without running anything yet
    pub fn classify(&self, request: &Request) -> Route {
        classify(request, self.ctx.registry.origin())
    }

    /// Route a request. The returned future owns everything it needs, so
    /// the host can drive it independently of other requests.
    pub fn route(&self, request: Request) -> Dispatch {
        match self.classify(&request) {
            Route::PassThrough(reason) => {
                debug!("Pass-through {} {} ({})", request.method, request.url, reason);
                Dispatch::PassThrough(reason)
            }
            Route::Intercept(strategy) => {
                debug!("{} {} -> {}", request.method, request.url, strategy);
                let ctx = self.ctx.clone();
                Dispatch::Respond {
                    strategy,
                    response: Box::pin(async move { strategy.execute(&ctx, &request).await }),
                }
            }
        }
    }
}
