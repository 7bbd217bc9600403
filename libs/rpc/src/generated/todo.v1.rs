// @generated
// This file is @generated by prost-build.
/// A reminder item.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Todo {
    #[prost(int64, tag="1")]
    pub id: i64,
    #[prost(string, tag="2")]
    pub title: ::prost::alloc::string::String,
    #[prost(string, tag="3")]
    pub description: ::prost::alloc::string::String,
    #[prost(message, optional, tag="4")]
    pub reminder: ::core::option::Option<::prost_types::Timestamp>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateRequest {
    /// Contract version requested by the caller ("v1").
    #[prost(string, tag="1")]
    pub api: ::prost::alloc::string::String,
    #[prost(message, optional, tag="2")]
    pub todo: ::core::option::Option<Todo>,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct CreateResponse {
    #[prost(string, tag="1")]
    pub api: ::prost::alloc::string::String,
    /// Identifier assigned by the store.
    #[prost(int64, tag="2")]
    pub id: i64,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct ReadRequest {
    #[prost(string, tag="1")]
    pub api: ::prost::alloc::string::String,
    #[prost(int64, tag="2")]
    pub id: i64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReadResponse {
    #[prost(string, tag="1")]
    pub api: ::prost::alloc::string::String,
    #[prost(message, optional, tag="2")]
    pub todo: ::core::option::Option<Todo>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateRequest {
    #[prost(string, tag="1")]
    pub api: ::prost::alloc::string::String,
    #[prost(message, optional, tag="2")]
    pub todo: ::core::option::Option<Todo>,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct UpdateResponse {
    #[prost(string, tag="1")]
    pub api: ::prost::alloc::string::String,
    /// Number of rows updated.
    #[prost(int64, tag="2")]
    pub updated: i64,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct DeleteRequest {
    #[prost(string, tag="1")]
    pub api: ::prost::alloc::string::String,
    #[prost(int64, tag="2")]
    pub id: i64,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct DeleteResponse {
    #[prost(string, tag="1")]
    pub api: ::prost::alloc::string::String,
    /// Number of rows deleted.
    #[prost(int64, tag="2")]
    pub deleted: i64,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct ReadAllRequest {
    #[prost(string, tag="1")]
    pub api: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReadAllResponse {
    #[prost(string, tag="1")]
    pub api: ::prost::alloc::string::String,
    #[prost(message, repeated, tag="2")]
    pub todos: ::prost::alloc::vec::Vec<Todo>,
}
include!("todo.v1.tonic.rs");
// @@protoc_insertion_point(module)
