// Domain layer: Mailchimp data model and the ports the jobs talk through.

pub mod model;
pub mod ports;
