// src/handlers/forms.rs

use axum::extract::Multipart;

use crate::{common::error::AppError, common::parse::FormFields, storage::ImageUpload};

/// Limite do corpo nas rotas com upload
pub const UPLOAD_BODY_LIMIT: usize = 10 * 1024 * 1024;

const IMAGE_FIELD: &str = "imagen";

/// Lê um formulário multipart: campos de texto viram `FormFields`,
/// o arquivo `imagen` (se vier) vira `ImageUpload`.
pub async fn read_multipart(mut mp: Multipart) -> Result<(FormFields, Option<ImageUpload>), AppError> {
    let mut fields = FormFields::new();
    let mut image = None;

    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("Formulario inválido: {}", e.body_text())))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == IMAGE_FIELD && field.file_name().is_some() {
            let original_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::bad_request(format!("Imagen inválida: {}", e.body_text())))?;

            // Input de arquivo vazio no navegador = sem imagem
            if !data.is_empty() {
                image = Some(ImageUpload { original_name, content_type, data });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::bad_request(format!("Campo {} inválido: {}", name, e.body_text())))?;
        fields.insert(name, value);
    }

    Ok((fields, image))
}
