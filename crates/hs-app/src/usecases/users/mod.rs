mod check_user_exists;

pub use check_user_exists::{CheckUserExists, CheckUserExistsError};
