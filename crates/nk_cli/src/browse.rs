//! Interactive navigation: the router driven from stdin.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use nk_app::AppShell;
use nk_core::{Article, User, View};
use nk_inference::Gateway;
use nk_storage::{ArticleCatalog, SavedArticles};

use crate::render;

const HELP: &str = "commands: go <view> | open <n> | back | save | login <name> <email> | logout | help | quit
views: home, finance, learn, weather, chat, admin, landing";

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Go(View),
    Open(usize),
    Back,
    Save,
    Login(User),
    Logout,
    Help,
    Quit,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or_default();
    match command {
        "go" => {
            let view = words.next().ok_or("go needs a view")?;
            Ok(Input::Go(view.parse()?))
        }
        "open" => {
            let n: usize = words
                .next()
                .ok_or("open needs a number")?
                .parse()
                .map_err(|_| "open needs a number".to_string())?;
            if n == 0 {
                return Err("articles are numbered from 1".to_string());
            }
            Ok(Input::Open(n - 1))
        }
        "back" => Ok(Input::Back),
        "save" => Ok(Input::Save),
        "login" => {
            let rest: Vec<&str> = words.collect();
            let Some((email, name)) = rest.split_last() else {
                return Err("login needs a name and an email".to_string());
            };
            if name.is_empty() {
                return Err("login needs a name and an email".to_string());
            }
            Ok(Input::Login(User {
                name: name.join(" "),
                email: email.to_string(),
                picture: String::new(),
            }))
        }
        "logout" => Ok(Input::Logout),
        "help" | "?" => Ok(Input::Help),
        "quit" | "exit" | "q" => Ok(Input::Quit),
        other => Err(format!("unknown command: {}", other)),
    }
}

/// Print the rendered view and return the articles it listed.
async fn show(
    shell: &AppShell,
    catalog: &ArticleCatalog,
    saved: &SavedArticles,
    gateway: &Gateway,
) -> Vec<Article> {
    let router = shell.router();
    match router.rendered_view() {
        View::Landing => {
            println!("Welcome to newskit. Sign in with `login <name> <email>` or `go home`.");
            Vec::new()
        }
        View::Home => {
            let breaking = catalog.fetch_news().await;
            let trending = catalog.fetch_trending_news().await;
            println!("Breaking news\n{}\n", render::article_list(&breaking));
            let mut listed = breaking;
            let offset = listed.len();
            println!("Trending");
            for (i, article) in trending.iter().enumerate() {
                println!("{}", render::article_line(offset + i, article));
            }
            let top_saved: Vec<Article> = saved.list().await.into_iter().take(5).collect();
            println!("\nSaved\n{}", render::article_list(&top_saved));
            listed.extend(trending);
            listed
        }
        View::Finance => match gateway.fetch_financial_news().await {
            Ok(articles) => {
                println!("Financial news\n{}", render::article_list(&articles));
                articles
            }
            Err(e) => {
                println!("{}", e);
                Vec::new()
            }
        },
        View::Learn => {
            let guides = catalog.fetch_how_to_guides().await;
            println!("How-to guides\n{}", render::article_list(&guides));
            guides
        }
        View::Weather => {
            match gateway.fetch_weather(nk_app::home::DEFAULT_CITY).await {
                Ok(weather) => print!("{}", render::weather(&weather)),
                Err(e) => println!("{}", e),
            }
            Vec::new()
        }
        View::ArticleDetail => {
            if let Some(article) = router.selected_article() {
                println!("{}", render::article(article));
                let state = if saved.has(&article.id).await { "saved" } else { "not saved" };
                println!("[{}] `save` toggles, `back` returns", state);
            }
            Vec::new()
        }
        View::Chat => {
            println!("Use `nk chat` to talk to the assistant.");
            Vec::new()
        }
        View::Admin => {
            println!("Use `nk admin --password <password> list` to manage articles.");
            Vec::new()
        }
    }
}

pub async fn run(
    shell: &mut AppShell,
    catalog: &ArticleCatalog,
    saved: &SavedArticles,
    gateway: &Gateway,
) -> anyhow::Result<()> {
    let moved = Arc::new(AtomicBool::new(true));
    let flag = moved.clone();
    let _subscription = shell.router().subscribe(move |event| {
        if event.reset_scroll {
            flag.store(true, Ordering::SeqCst);
        }
    });

    let mut listed = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if moved.swap(false, Ordering::SeqCst) {
            println!("\n── {} ──", shell.router().rendered_view());
            listed = show(shell, catalog, saved, gateway).await;
        }
        print!("{}> ", shell.router().rendered_view());
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_input(&line) {
            Ok(Input::Go(view)) => shell.router_mut().navigate_to(view),
            Ok(Input::Open(index)) => match listed.get(index) {
                Some(article) => shell.router_mut().select_article(article.clone()),
                None => println!("no article {} on this page", index + 1),
            },
            Ok(Input::Back) => shell.router_mut().go_back(),
            Ok(Input::Save) => match shell.router().selected_article() {
                Some(article) => {
                    let now_saved = saved.toggle(article).await?;
                    println!("{}", if now_saved { "saved" } else { "removed from saved" });
                }
                None => println!("open an article first"),
            },
            Ok(Input::Login(user)) => shell.sign_in(user),
            Ok(Input::Logout) => shell.sign_out(),
            Ok(Input::Help) => println!("{}", HELP),
            Ok(Input::Quit) => break,
            Err(e) => println!("{} (try `help`)", e),
        }
    }
    Ok(())
}
