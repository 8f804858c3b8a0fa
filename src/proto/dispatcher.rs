// Hand-maintained proto types equivalent to tonic-build output for dispatcher.proto.
// Regenerate with `protoc` when available.

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WorkerRegisterRequest {
    #[prost(string, tag = "1")]
    pub tenant_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub worker_name: ::prost::alloc::string::String,
    #[prost(string, repeated, tag = "3")]
    pub actions: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(string, repeated, tag = "4")]
    pub services: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WorkerRegisterResponse {
    #[prost(string, tag = "1")]
    pub tenant_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub worker_id: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub worker_name: ::prost::alloc::string::String,
}

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AssignedAction {
    #[prost(string, tag = "1")]
    pub tenant_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub job_id: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub job_name: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub job_run_id: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub step_id: ::prost::alloc::string::String,
    #[prost(string, tag = "6")]
    pub step_run_id: ::prost::alloc::string::String,
    #[prost(string, tag = "7")]
    pub action_id: ::prost::alloc::string::String,
    #[prost(enumeration = "ActionType", tag = "8")]
    pub action_type: i32,
    #[prost(string, tag = "9")]
    pub action_payload: ::prost::alloc::string::String,
    #[prost(string, tag = "10")]
    pub worker_id: ::prost::alloc::string::String,
}

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WorkerListenRequest {
    #[prost(string, tag = "1")]
    pub tenant_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub worker_id: ::prost::alloc::string::String,
}

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WorkerUnsubscribeRequest {
    #[prost(string, tag = "1")]
    pub tenant_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub worker_id: ::prost::alloc::string::String,
}

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WorkerUnsubscribeResponse {
    #[prost(string, tag = "1")]
    pub tenant_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub worker_id: ::prost::alloc::string::String,
}

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StepActionEvent {
    #[prost(string, tag = "1")]
    pub tenant_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub worker_id: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub job_id: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub job_run_id: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub step_id: ::prost::alloc::string::String,
    #[prost(string, tag = "6")]
    pub step_run_id: ::prost::alloc::string::String,
    #[prost(string, tag = "7")]
    pub action_id: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "8")]
    pub event_timestamp: ::core::option::Option<::prost_types::Timestamp>,
    #[prost(enumeration = "StepActionEventType", tag = "9")]
    pub event_type: i32,
    #[prost(string, tag = "10")]
    pub event_payload: ::prost::alloc::string::String,
}

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ActionEventResponse {
    #[prost(string, tag = "1")]
    pub tenant_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub worker_id: ::prost::alloc::string::String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ActionType {
    StartStepRun = 0,
    CancelStepRun = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum StepActionEventType {
    StepEventTypeUnknown = 0,
    StepEventTypeStarted = 1,
    StepEventTypeCompleted = 2,
    StepEventTypeFailed = 3,
}

// -- gRPC service client --

pub mod dispatcher_client {
    use super::*;

    #[derive(Debug, Clone)]
    pub struct DispatcherClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl DispatcherClient<tonic::transport::Channel> {
        pub fn new(channel: tonic::transport::Channel) -> Self {
            let inner = tonic::client::Grpc::new(channel);
            Self { inner }
        }
    }

    impl<T> DispatcherClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
        T::ResponseBody: tonic::codegen::Body<Data = tonic::codegen::Bytes> + std::marker::Send + 'static,
        <T::ResponseBody as tonic::codegen::Body>::Error: Into<Box<dyn std::error::Error + Send + Sync>> + std::marker::Send,
    {
        pub fn with_interceptor<F>(
            inner: T,
            interceptor: F,
        ) -> DispatcherClient<tonic::service::interceptor::InterceptedService<T, F>>
        where
            F: tonic::service::Interceptor,
            T: tonic::codegen::Service<
                http::Request<tonic::body::BoxBody>,
                Response = http::Response<
                    <T as tonic::client::GrpcService<tonic::body::BoxBody>>::ResponseBody,
                >,
            >,
            <T as tonic::codegen::Service<http::Request<tonic::body::BoxBody>>>::Error:
                Into<Box<dyn std::error::Error + Send + Sync>> + std::marker::Send + std::marker::Sync,
        {
            DispatcherClient {
                inner: tonic::client::Grpc::new(tonic::service::interceptor::InterceptedService::new(
                    inner,
                    interceptor,
                )),
            }
        }

        pub async fn register(
            &mut self,
            request: impl tonic::IntoRequest<WorkerRegisterRequest>,
        ) -> std::result::Result<tonic::Response<WorkerRegisterResponse>, tonic::Status> {
            self.inner.ready().await.map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("{}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/Dispatcher/Register");
            let mut req = request.into_request();
            req.extensions_mut().insert(tonic::GrpcMethod::new("Dispatcher", "Register"));
            self.inner.unary(req, path, codec).await
        }

        pub async fn listen(
            &mut self,
            request: impl tonic::IntoRequest<WorkerListenRequest>,
        ) -> std::result::Result<tonic::Response<tonic::Streaming<AssignedAction>>, tonic::Status> {
            self.inner.ready().await.map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("{}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/Dispatcher/Listen");
            let mut req = request.into_request();
            req.extensions_mut().insert(tonic::GrpcMethod::new("Dispatcher", "Listen"));
            self.inner.server_streaming(req, path, codec).await
        }

        pub async fn unsubscribe(
            &mut self,
            request: impl tonic::IntoRequest<WorkerUnsubscribeRequest>,
        ) -> std::result::Result<tonic::Response<WorkerUnsubscribeResponse>, tonic::Status> {
            self.inner.ready().await.map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("{}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/Dispatcher/Unsubscribe");
            let mut req = request.into_request();
            req.extensions_mut().insert(tonic::GrpcMethod::new("Dispatcher", "Unsubscribe"));
            self.inner.unary(req, path, codec).await
        }

        pub async fn send_step_action_event(
            &mut self,
            request: impl tonic::IntoRequest<StepActionEvent>,
        ) -> std::result::Result<tonic::Response<ActionEventResponse>, tonic::Status> {
            self.inner.ready().await.map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("{}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/Dispatcher/SendStepActionEvent");
            let mut req = request.into_request();
            req.extensions_mut().insert(tonic::GrpcMethod::new("Dispatcher", "SendStepActionEvent"));
            self.inner.unary(req, path, codec).await
        }
    }
}
