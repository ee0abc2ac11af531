pub mod error;

pub mod config {
    pub mod config;
    pub mod ports;
}

pub mod action {
    pub mod cli;
    pub mod interactive;
}

pub mod facade {
    pub mod conversion_facade;
    pub mod traits {
        pub mod i_conversion;
    }
}

pub mod models {
    pub mod conversion;
}

pub mod service {
    pub mod config_service;
    pub mod controller;
    pub mod file;
    pub mod libreoffice;
    pub mod lifecycle;
    pub mod notifier;
    pub mod process;
    pub mod retry;
    pub mod worker;
    pub mod traits {
        pub mod i_office;
        pub mod i_service;
    }
}

pub mod utils {
    pub mod clock;
    pub mod utils;
}
