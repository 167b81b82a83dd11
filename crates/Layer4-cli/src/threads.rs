//! `relay threads`, `relay show` 서브커맨드

use relay_foundation::strings::truncate_with_ellipsis;
use relay_foundation::DelegationStore;

/// 최근 스레드 목록
pub fn list_threads_cmd(store: &dyn DelegationStore, limit: u32) -> anyhow::Result<()> {
    let threads = store.list_threads(Some(limit))?;

    if threads.is_empty() {
        println!("No threads found.");
        return Ok(());
    }

    println!("\n📋 Recent Threads\n");
    println!(
        "{:<38} {:<13} {:<10} {:<32}",
        "ID", "Kind", "Status", "Name"
    );
    println!("{}", "-".repeat(95));

    for thread in threads {
        let name = thread.name.as_deref().unwrap_or("(untitled)");
        println!(
            "{:<38} {:<13} {:<10} {:<32}",
            thread.id,
            thread.kind.as_str(),
            thread.status.as_str(),
            truncate_with_ellipsis(name, 29)
        );
    }

    println!("\nUse 'relay show <ID>' to print a thread's messages.");
    println!("Use 'relay --thread <ID>' to continue a conversation.\n");

    Ok(())
}

/// 스레드 메시지 출력 (위임 작업이면 작업 상태 포함)
pub fn show_thread_cmd(store: &dyn DelegationStore, thread_id: &str) -> anyhow::Result<()> {
    let Some(thread) = store.get_thread(thread_id)? else {
        anyhow::bail!("Thread not found: {}", thread_id);
    };

    println!(
        "Thread {} ({}, {})",
        thread.id,
        thread.kind.as_str(),
        thread.status.as_str()
    );
    if let Some(name) = &thread.name {
        println!("Name: {}", name);
    }
    if let Some(parent) = &thread.parent_thread_id {
        println!("Parent: {}", parent);
    }

    for task in store
        .list_threads(None)?
        .into_iter()
        .filter(|t| t.parent_thread_id.as_deref() == Some(thread.id.as_str()))
    {
        println!("  └─ task thread {} [{}]", task.id, task.status.as_str());
    }
    println!();

    for message in store.get_messages(&thread.id)? {
        println!("[{}] {}:", message.created_at, message.role.as_str());
        println!("{}\n", message.content);
    }

    Ok(())
}
