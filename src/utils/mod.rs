pub mod db_utils;
pub mod email_index;
pub mod request_id;
pub mod tabular;
pub mod validation;
