use serde::{Deserialize, Serialize};

use crate::coord::Coord;


// Events emitted to the host. Delivered through an `mpsc` channel handed to the board at
// construction; the host drains it after every callback.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum BoardEvent {
    // A move was applied, either from user input or from an executed premove.
    Move {
        from: Coord,
        to: Coord,
        new_position: String,
    },
    // A user move was rejected by the rules engine. Never emitted for premoves.
    IllegalMove {
        from: Coord,
        to: Coord,
        reason: String,
    },
    // The position was replaced through `set_position`.
    PositionUpdated { new_position: String },
}
