use std::sync::Arc;

use grpc_helpers::ServerConfig;
use rpc::todo::v1::todo_service_server::{TodoService, TodoServiceServer};
use rpc::todo::v1::{
    CreateRequest, CreateResponse, DeleteRequest, DeleteResponse, ReadAllRequest,
    ReadAllResponse, ReadRequest, ReadResponse, UpdateRequest, UpdateResponse,
};
use tokio_util::sync::CancellationToken;
use tonic::codec::CompressionEncoding;
use tonic::{Request, Response, Status};

use crate::context::CallContext;
use crate::service::TodoHandler;
use crate::store::Store;

/// `todo.v1.TodoService` on top of a shared [`TodoHandler`].
pub struct TodoServiceImpl<S: Store + 'static> {
    handler: Arc<TodoHandler<S>>,
    shutdown: CancellationToken,
}

impl<S: Store + 'static> TodoServiceImpl<S> {
    /// `shutdown` is the process root token; each call gets a child of it.
    pub fn new(handler: Arc<TodoHandler<S>>, shutdown: CancellationToken) -> Self {
        Self { handler, shutdown }
    }

    /// Wrap in the generated server with the message size limits from
    /// `config`, accepting and sending zstd when compression is enabled.
    pub fn into_server(self, config: &ServerConfig) -> TodoServiceServer<Self> {
        let server = TodoServiceServer::new(self)
            .max_decoding_message_size(config.max_decoding_message_size)
            .max_encoding_message_size(config.max_encoding_message_size);

        if config.enable_compression {
            server
                .accept_compressed(CompressionEncoding::Zstd)
                .send_compressed(CompressionEncoding::Zstd)
        } else {
            server
        }
    }

    fn context<T>(&self, request: &Request<T>) -> CallContext {
        CallContext::child_of(
            &self.shutdown,
            grpc_helpers::request_id(request.metadata()),
        )
    }
}

#[tonic::async_trait]
impl<S: Store + 'static> TodoService for TodoServiceImpl<S> {
    async fn create(&self, request: Request<CreateRequest>) -> Result<Response<CreateResponse>, Status> {
        let ctx = self.context(&request);
        let _cancel_on_drop = ctx.cancel_on_drop();
        let reply = self.handler.create(&ctx, request.into_inner()).await?;
        Ok(Response::new(reply))
    }

    async fn read(&self, request: Request<ReadRequest>) -> Result<Response<ReadResponse>, Status> {
        let ctx = self.context(&request);
        let _cancel_on_drop = ctx.cancel_on_drop();
        let reply = self.handler.read(&ctx, request.into_inner()).await?;
        Ok(Response::new(reply))
    }

    async fn update(&self, request: Request<UpdateRequest>) -> Result<Response<UpdateResponse>, Status> {
        let ctx = self.context(&request);
        let _cancel_on_drop = ctx.cancel_on_drop();
        let reply = self.handler.update(&ctx, request.into_inner()).await?;
        Ok(Response::new(reply))
    }

    async fn delete(&self, request: Request<DeleteRequest>) -> Result<Response<DeleteResponse>, Status> {
        let ctx = self.context(&request);
        let _cancel_on_drop = ctx.cancel_on_drop();
        let reply = self.handler.delete(&ctx, request.into_inner()).await?;
        Ok(Response::new(reply))
    }

    async fn read_all(
        &self,
        request: Request<ReadAllRequest>,
    ) -> Result<Response<ReadAllResponse>, Status> {
        let ctx = self.context(&request);
        let _cancel_on_drop = ctx.cancel_on_drop();
        let reply = self.handler.read_all(&ctx, request.into_inner()).await?;
        Ok(Response::new(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MockStore, MockStoreConnection, StoreConnection};
    use tonic::Code;
    use tonic::metadata::MetadataValue;

    fn service(store: MockStore) -> TodoServiceImpl<MockStore> {
        TodoServiceImpl::new(Arc::new(TodoHandler::new(store)), CancellationToken::new())
    }

    #[tokio::test]
    async fn test_missing_todo_is_not_found_code() {
        let mut store = MockStore::new();
        store.expect_connect().returning(|_| {
            let mut conn = MockStoreConnection::new();
            conn.expect_query().returning(|_, _| Ok(vec![]));
            Ok(Box::new(conn) as Box<dyn StoreConnection>)
        });

        let status = service(store)
            .read(Request::new(ReadRequest { api: "v1".into(), id: 999 }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
        assert_eq!(status.message(), "ToDo with ID='999' is not found");
    }

    #[tokio::test]
    async fn test_version_mismatch_is_unimplemented() {
        let mut store = MockStore::new();
        store.expect_connect().never();

        let status = service(store)
            .read_all(Request::new(ReadAllRequest { api: "v2".into() }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::Unimplemented);
    }

    #[tokio::test]
    async fn test_request_id_reaches_the_store() {
        let mut store = MockStore::new();
        store
            .expect_connect()
            .withf(|ctx| ctx.request_id.as_deref() == Some("req-42"))
            .returning(|_| {
                let mut conn = MockStoreConnection::new();
                conn.expect_query().returning(|_, _| Ok(vec![]));
                Ok(Box::new(conn) as Box<dyn StoreConnection>)
            });

        let mut request = Request::new(ReadAllRequest::default());
        request
            .metadata_mut()
            .insert("x-request-id", MetadataValue::from_static("req-42"));

        let reply = service(store).read_all(request).await.unwrap().into_inner();
        assert_eq!(reply.api, "v1");
    }
}
