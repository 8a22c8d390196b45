pub mod connector_error;
