pub mod handlers;
pub mod identity;
pub mod rpc;
pub mod server;

pub use handlers::{HandlerState, RequestContext};
pub use identity::{IdentityProvider, OpenAccessProvider, StaticTokenProvider, UserIdentity};
pub use rpc::{RpcError, RpcRequest, RpcResponse};
pub use server::{build_router, start, AppState, ServerConfig, ServerHandle};
