use glam::Vec3;

use crate::AssetError;

/// One `newmtl` block.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDef {
    pub name: String,
    pub diffuse: Vec3,
    /// File name of the diffuse map, directories stripped.
    pub texture: Option<String>,
}

impl MaterialDef {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            diffuse: Vec3::ONE,
            texture: None,
        }
    }
}

/// Materials in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialTable {
    materials: Vec<MaterialDef>,
}

impl MaterialTable {
    pub fn get(&self, name: &str) -> Option<&MaterialDef> {
        self.materials.iter().find(|m| m.name == name)
    }

    pub fn first(&self) -> Option<&MaterialDef> {
        self.materials.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MaterialDef> {
        self.materials.iter()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

/// Last path component, accepting either separator.
fn basename(path: &str) -> &str {
    path.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(path)
}

/// Parse MTL text. Only `newmtl`, `Kd` and `map_Kd` are read; statements
/// before the first `newmtl` are ignored.
pub fn parse_mtl(text: &str) -> Result<MaterialTable, AssetError> {
    let mut table = MaterialTable::default();
    for (i, raw) in text.lines().enumerate() {
        let fields: Vec<&str> = raw.split_whitespace().collect();
        let Some((&tag, rest)) = fields.split_first() else {
            continue;
        };
        if tag == "newmtl" {
            let name = rest.first().copied().unwrap_or("");
            table.materials.push(MaterialDef::named(name));
            continue;
        }
        let Some(current) = table.materials.last_mut() else {
            continue;
        };
        match tag {
            "Kd" => {
                let parsed: Result<Vec<f32>, _> = rest.iter().take(3).map(|f| f.parse()).collect();
                match parsed.ok().filter(|v| v.len() == 3) {
                    Some(v) => current.diffuse = Vec3::new(v[0], v[1], v[2]),
                    None => {
                        return Err(AssetError::Parse {
                            line: i + 1,
                            message: format!("bad Kd {rest:?}"),
                        });
                    }
                }
            }
            // Options may precede the file name; it is always last.
            "map_Kd" => current.texture = rest.last().map(|p| basename(p).to_string()),
            _ => {}
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_diffuse_and_texture() {
        let table = parse_mtl(
            "\
# exported
newmtl Bark
Ns 10
Kd 0.4 0.3 0.2
map_Kd C:\\Users\\art\\bark.png

newmtl Leaves
map_Kd -s 1 1 1 textures/leaves.jpg
",
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        let bark = table.get("Bark").unwrap();
        assert_eq!(bark.diffuse, Vec3::new(0.4, 0.3, 0.2));
        assert_eq!(bark.texture.as_deref(), Some("bark.png"));
        let leaves = table.get("Leaves").unwrap();
        assert_eq!(leaves.diffuse, Vec3::ONE);
        assert_eq!(leaves.texture.as_deref(), Some("leaves.jpg"));
        assert_eq!(table.first().map(|m| m.name.as_str()), Some("Bark"));
    }

    #[test]
    fn statements_before_newmtl_are_ignored() {
        let table = parse_mtl("Kd 1 0 0\nmap_Kd a.png\n").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn bad_kd_is_an_error() {
        assert!(parse_mtl("newmtl M\nKd 1 0\n").is_err());
    }
}
