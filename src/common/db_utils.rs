use crate::common::error::AppError;

// ---
// Helper: violação de chave única -> 409
// ---
/// Converte uma violação de índice único em `Conflict` com a mensagem dada.
/// Os índices únicos cobrem as corridas entre "verificar duplicado" e "inserir".
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            tracing::warn!(
                "Violação de unicidade ({}): {}",
                db_err.constraint().unwrap_or_default(),
                message
            );
            return AppError::conflict(message);
        }
    }
    e.into()
}

/// Padrão `%texto%` em minúsculas para buscas por substring sem diferenciar caixa.
/// Os curingas do próprio texto são escapados para o `LIKE ... ESCAPE '\'`.
pub(crate) fn like_pattern(query: &str) -> String {
    let escaped = query
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
