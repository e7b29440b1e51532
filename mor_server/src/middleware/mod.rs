mod acl;
mod authenticate;

pub use acl::{AclMiddlewareFactory, AclMiddlewareService};
pub use authenticate::{bearer_token, AuthenticationMiddlewareFactory, AuthenticationMiddlewareService};
