pub mod token_request;
