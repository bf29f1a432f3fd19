pub mod complete_sign_in;
pub mod current_user;
pub mod sign_out;
