pub mod landing_server;
