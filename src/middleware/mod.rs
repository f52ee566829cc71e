pub mod auth;
pub mod bind_tenant;
pub mod response;
pub mod sweeper;

pub use auth::{jwt_auth_middleware, AuthSettings, AuthUser};
pub use bind_tenant::{bind_tenant, TenantBinder, TenantConnection, DATABASE_HOST_HEADER, TENANT_ID_HEADER};
pub use response::{ApiResponse, ApiResult};
