mod settings;

pub use settings::{
    Config, ServiceConfig, TomlConfig, WorkflowConfig, EXAMPLE_CONFIG, SERVICE_URL_ENV,
};
