pub mod dispatcher_service;

pub use dispatcher_service::{Dispatcher, DispatcherCommand, DispatcherHandle};
