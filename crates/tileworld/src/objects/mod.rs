mod interactable;
mod npc;
mod spawner;

pub use interactable::{InteractableObject, ObjectId, ObjectStorageSync};
pub use npc::Npc;
pub use spawner::InteractableObjectSpawner;
