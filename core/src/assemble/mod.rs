pub mod assembler;
pub mod frame;

pub use assembler::{assemble_frames, Assembled};
pub use frame::{
    Buttons, FrameGap, FrameObject, GameEnding, ItemFrame, PlayerFrame, ReplayData, ReplaySettings,
    StageFrame, TRACKED_ITEM_TYPES,
};
