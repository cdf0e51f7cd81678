//! Generates the thin CRUD clients that wrap a [`crate::gateway::ResourceClient`].
//!
//! Each generated method is instrumented and converts the gateway error into the
//! collaborator's own error type. Updates and deletes that touch no row surface
//! as `NotFound(id)`.

macro_rules! impl_client_methods {
    ($client_name:ident, $entity:ty, $payload:ty, $error:ident, $entity_name_snake:ident) => {
        paste::paste! {
            impl $client_name {
                #[tracing::instrument(skip(self))]
                pub async fn [<create_ $entity_name_snake>](&self, payload: $payload) -> Result<i64, $error> {
                    tracing::debug!("Sending request");
                    self.inner.create(payload).await.map_err($error::from)
                }

                #[tracing::instrument(skip(self))]
                pub async fn [<get_ $entity_name_snake>](&self, id: i64) -> Result<Option<$entity>, $error> {
                    tracing::debug!("Sending request");
                    self.inner.get(id).await.map_err($error::from)
                }

                #[tracing::instrument(skip(self))]
                pub async fn [<list_ $entity_name_snake s>](
                    &self,
                    page: u32,
                ) -> Result<crate::domain::Page<$entity>, $error> {
                    tracing::debug!("Sending request");
                    self.inner.list(page).await.map_err($error::from)
                }

                #[tracing::instrument(skip(self))]
                pub async fn [<update_ $entity_name_snake>](&self, id: i64, payload: $payload) -> Result<(), $error> {
                    tracing::debug!("Sending request");
                    match self.inner.update(id, payload).await.map_err($error::from)? {
                        true => Ok(()),
                        false => Err($error::NotFound(id)),
                    }
                }

                #[tracing::instrument(skip(self))]
                pub async fn [<delete_ $entity_name_snake>](&self, id: i64) -> Result<(), $error> {
                    tracing::debug!("Sending request");
                    match self.inner.delete(id).await.map_err($error::from)? {
                        true => Ok(()),
                        false => Err($error::NotFound(id)),
                    }
                }
            }
        }
    };
}

macro_rules! impl_client_new {
    ($client_name:ident, $entity:ty) => {
        impl $client_name {
            pub fn new(db: crate::gateway::Database) -> Self {
                Self {
                    inner: crate::gateway::ResourceClient::<$entity>::new(db),
                }
            }
        }
    };
}

macro_rules! impl_basic_client {
    ($client_name:ident, $entity:ty, $payload:ty, $error:ident, $entity_name_snake:ident) => {
        impl_client_new!($client_name, $entity);
        impl_client_methods!($client_name, $entity, $payload, $error, $entity_name_snake);
    };
}
