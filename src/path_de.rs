use serde::de::DeserializeOwned;

/// Deserialize TOML with the key path of the failing value in error messages.
pub fn from_toml_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = toml::Deserializer::new(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at key {path} → {}", err.into_inner()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Outer {
        #[allow(dead_code)]
        inner: Inner,
    }

    #[derive(Debug, Deserialize)]
    struct Inner {
        #[allow(dead_code)]
        count: u32,
    }

    #[test]
    fn errors_name_the_key_path() {
        let err = from_toml_str_with_path::<Outer>("[inner]\ncount = \"three\"\n").unwrap_err();
        assert!(err.contains("inner.count"), "{err}");
    }
}
