mod auth_service;
mod client_flow;
mod support;
