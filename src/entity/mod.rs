pub mod agents;
pub mod skills;

pub use agents::AgentArchetype;
pub use skills::{Profession, Skill, SkillLevel, SkillTable};
