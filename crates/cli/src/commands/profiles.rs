//! `nexus profiles` / `nexus agents`: List profiles and agents.

use nexus_core::Nexus;

use super::Runtime;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let runtime = Runtime::load(None).await?;
    let names = runtime.chat.profile_names();

    if names.is_empty() {
        println!("No profiles found in {}", runtime.config.profiles_dir().display());
        return Ok(());
    }

    for name in names {
        let profile = runtime.chat.get_profile(&name)?;
        let persona = profile.persona.lines().next().unwrap_or_default();
        println!("{:<20} {}", profile.name, persona);
    }

    Ok(())
}

pub async fn agents() -> Result<(), Box<dyn std::error::Error>> {
    let runtime = Runtime::load(None).await?;

    for participant in runtime.chat.participants() {
        let Some(agent) = runtime.chat.get_agent(&participant.username) else {
            continue;
        };
        let profile = agent.profile().map(|p| p.name.as_str()).unwrap_or("-");
        println!("{} {:<20} {}", participant.avatar, agent.name(), profile);
    }

    Ok(())
}
