pub mod queued_messages;
