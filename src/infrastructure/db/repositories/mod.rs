pub mod article_repository_sqlx;
pub mod interactive_repository_sqlx;
