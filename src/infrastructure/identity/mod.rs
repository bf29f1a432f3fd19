pub mod oauth_client;
