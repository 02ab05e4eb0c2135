pub mod aemet_server;
