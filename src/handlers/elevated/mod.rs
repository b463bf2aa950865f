// handlers/elevated/mod.rs - Elevated handlers (commander role required)
//
// Route Prefix: /api, /api/:id
// Middleware: authenticate + authorize(commander)

pub mod users;
