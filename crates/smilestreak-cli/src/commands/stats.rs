use smilestreak_core::Config;

use super::{open_engine, CmdResult};

pub fn run(json: bool) -> CmdResult {
    let config = Config::load()?;
    let mut engine = open_engine(&config)?;
    let stats = engine.stats();
    let message = engine.motivational_message();

    if json {
        let mut value = serde_json::to_value(&stats)?;
        value["message"] = serde_json::Value::String(message);
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let day = |d: Option<chrono::NaiveDate>| {
        d.map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "never".to_string())
    };

    println!("Challenges completed: {}", stats.challenges_completed);
    println!("Sessions:             {}", stats.total_sessions);
    println!("Day streak:           {} (best {})", stats.current_day_streak, stats.best_day_streak);
    println!("Completed today:      {}", if stats.today_completed { "yes" } else { "no" });
    println!("Longest smile:        {:.1}s", stats.longest_smile);
    println!("Average smile:        {:.1}s", stats.average_smile_time);
    println!("Total smile time:     {:.1}s", stats.total_smile_time);
    println!("Last completion:      {}", day(stats.last_completion_date));
    println!("Last played:          {}", day(stats.last_play_date));
    println!();
    println!("{message}");
    Ok(())
}
