use crate::domain::{User, UserCreate};
use crate::gateway::ResourceClient;
use crate::user::UserError;

/// Client for the user records.
#[derive(Clone)]
pub struct UserClient {
    inner: ResourceClient<User>,
}

impl_basic_client!(UserClient, User, UserCreate, UserError, user);
