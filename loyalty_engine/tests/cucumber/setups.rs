use cucumber::given;
use loyalty_engine::test_utils::prepare_env::create_test_account;

use crate::cucumber::{loyalty_world::LoyaltySystem, LoyaltyWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut LoyaltyWorld) {
    let system = LoyaltySystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a customer called {word}")]
async fn customer(world: &mut LoyaltyWorld, login: String) {
    let system = world.system_mut();
    let id = create_test_account(&system.db, &login).await;
    system.accounts.insert(login, id);
}
