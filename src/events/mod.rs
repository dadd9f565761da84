pub mod guild;
pub mod interaction;
pub mod message;
pub mod voice;

pub use guild::{
    handle_channel_create, handle_channel_delete, handle_member_add, handle_role_create,
    handle_role_delete,
};
pub use interaction::handle_interaction;
pub use message::{handle_message, handle_message_delete, handle_message_update};
pub use voice::handle_voice_state_update;
