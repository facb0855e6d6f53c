mod sqlite_gateway;

pub use sqlite_gateway::{SqliteGateway, IN_MEMORY};
