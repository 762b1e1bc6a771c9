mod loyalty_world;
mod setups;

pub use loyalty_world::LoyaltyWorld;
