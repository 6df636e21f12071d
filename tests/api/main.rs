mod helpers;
mod unsubscribe;
mod verify;
