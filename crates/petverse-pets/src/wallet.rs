//! Token balance operations.
//!
//! Balances are `u64` and every operation is checked: a debit larger than
//! the balance is a [`GameError::InsufficientTokens`] and leaves the player
//! untouched.

use petverse_types::Player;

use crate::error::GameError;

/// Price of `quantity` units at `unit_price`.
pub fn total_cost(unit_price: u64, quantity: u32) -> Result<u64, GameError> {
    unit_price
        .checked_mul(u64::from(quantity))
        .ok_or_else(|| GameError::ArithmeticOverflow {
            context: String::from("purchase total overflow"),
        })
}

/// Remove `amount` tokens from the player.
pub fn debit(player: &mut Player, amount: u64) -> Result<(), GameError> {
    player.tokens = player
        .tokens
        .checked_sub(amount)
        .ok_or(GameError::InsufficientTokens {
            required: amount,
            available: player.tokens,
        })?;
    Ok(())
}

/// Add `amount` tokens to the player.
pub fn credit(player: &mut Player, amount: u64) -> Result<(), GameError> {
    player.tokens = player
        .tokens
        .checked_add(amount)
        .ok_or_else(|| GameError::ArithmeticOverflow {
            context: String::from("token balance overflow"),
        })?;
    Ok(())
}
