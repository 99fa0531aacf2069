pub mod db;

pub use db::{
    create_db, get_prescription, insert_prescription, list_recent_prescriptions, DbPool,
};
