pub mod events {
    pub const WAITING_FOR_QUOTA: &str = "waiting for quota";
}

pub mod execution_status {
    pub const DONE: &str = "Done";
    pub const FAILED: &str = "Failed";
}

pub mod entity_types {
    pub const SAMPLE: &str = "sample";
    pub const SAMPLE_SET: &str = "sample_set";
    pub const PARTICIPANT: &str = "participant";
    pub const PARTICIPANT_SET: &str = "participant_set";
}

pub mod attributes {
    pub const ENTITY_PREFIX: &str = "this.";
}

pub mod env {
    pub const LOG_LEVEL: &str = "RECKON_LOG_LEVEL";
    pub const LOG_TEE: &str = "RECKON_LOG_TEE";
    pub const ACCESS_TOKEN: &str = "RECKON_ACCESS_TOKEN";
}

pub mod dirs {
    pub const RECKON: &str = "reckon";
    pub const LOGS: &str = "logs";
}

pub mod files {
    pub const CONFIG: &str = "config.toml";
    pub const SESSION: &str = "session.json";
    pub const CURRENT_LOG: &str = "reckon.log";
    pub const LOG_PREFIX: &str = "reckon_";
}
