//! Sample domain shared by the integration tests
#![allow(dead_code)]

use cadastro::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Marca {
    pub id: i32,
    pub nome: String,
}

impl Entity for Marca {
    type Id = i32;
    const TABLE: &'static str = "marcas";
    const NAME: &'static str = "Marca";
    const UNIQUE: &'static [&'static str] = &["nome"];
    const FIELDS: &'static [Field<Self>] = &[
        Field::scalar("id", |m: &Self| FieldValue::from(m.id)),
        Field::scalar("nome", |m: &Self| FieldValue::from(m.nome.as_str())),
    ];

    fn id(&self) -> i32 {
        self.id
    }

    fn set_id(&mut self, id: i32) {
        self.id = id;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Modelo {
    pub id: i32,
    pub nome: String,
    pub marca_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marca: Option<Marca>,
}

impl Entity for Modelo {
    type Id = i32;
    const TABLE: &'static str = "modelos";
    const NAME: &'static str = "Modelo";
    const RELATIONS: &'static [Relation] = &[Relation::belongs_to("marca", "marca_id", "marcas")];
    const FIELDS: &'static [Field<Self>] = &[
        Field::scalar("nome", |m: &Self| FieldValue::from(m.nome.as_str())),
        Field::related("marca.nome", "marca", |m: &Self| {
            FieldValue::from(m.marca.as_ref().map(|marca| marca.nome.clone()))
        }),
    ];

    fn id(&self) -> i32 {
        self.id
    }

    fn set_id(&mut self, id: i32) {
        self.id = id;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Veiculo {
    pub id: Uuid,
    pub placa: String,
    pub ano: i32,
    pub modelo_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modelo: Option<Modelo>,
}

impl Entity for Veiculo {
    type Id = Uuid;
    const TABLE: &'static str = "veiculos";
    const NAME: &'static str = "Veículo";
    const UNIQUE: &'static [&'static str] = &["placa"];
    const RELATIONS: &'static [Relation] = &[Relation::belongs_to(
        "modelo",
        "modelo_id",
        "modelos",
    )
    .with_nested(<Modelo as Entity>::RELATIONS)];
    const FIELDS: &'static [Field<Self>] = &[
        Field::scalar("placa", |v: &Self| FieldValue::from(v.placa.as_str())),
        Field::scalar("ano", |v: &Self| FieldValue::from(v.ano)),
        Field::related("modelo.nome", "modelo", |v: &Self| {
            FieldValue::from(v.modelo.as_ref().map(|m| m.nome.clone()))
        }),
        Field::related("modelo.marca.nome", "modelo.marca", |v: &Self| {
            FieldValue::from(
                v.modelo
                    .as_ref()
                    .and_then(|m| m.marca.as_ref())
                    .map(|marca| marca.nome.clone()),
            )
        }),
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VeiculoDto {
    pub placa: String,
    pub modelo: Option<String>,
    pub marca: Option<String>,
}

impl Projection<Veiculo> for VeiculoDto {
    fn project(entity: &Veiculo) -> Self {
        Self {
            placa: entity.placa.clone(),
            modelo: entity.modelo.as_ref().map(|m| m.nome.clone()),
            marca: entity
                .modelo
                .as_ref()
                .and_then(|m| m.marca.as_ref())
                .map(|marca| marca.nome.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tarifa {
    pub id: i32,
    pub descricao: String,
    pub valor: f64,
}

impl Entity for Tarifa {
    type Id = i32;
    const TABLE: &'static str = "tarifas";
    const NAME: &'static str = "Tarifa";
    const FIELDS: &'static [Field<Self>] = &[
        Field::scalar("id", |t: &Self| FieldValue::from(t.id)),
        Field::scalar("descricao", |t: &Self| FieldValue::from(t.descricao.as_str())),
        Field::scalar("valor", |t: &Self| FieldValue::from(t.valor)),
    ];

    fn id(&self) -> i32 {
        self.id
    }

    fn set_id(&mut self, id: i32) {
        self.id = id;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarifaDto {
    pub id: i32,
    pub descricao: String,
}

impl Projection<Tarifa> for TarifaDto {
    fn project(entity: &Tarifa) -> Self {
        Self {
            id: entity.id,
            descricao: entity.descricao.clone(),
        }
    }
}

/// Item priced by a tariff; keeps the tariff from being deleted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i32,
    pub nome: String,
    pub tarifa_id: i32,
}

impl Entity for Item {
    type Id = i32;
    const TABLE: &'static str = "itens";
    const NAME: &'static str = "Item";
    const RELATIONS: &'static [Relation] = &[Relation::belongs_to("tarifa", "tarifa_id", "tarifas")];

    fn id(&self) -> i32 {
        self.id
    }

    fn set_id(&mut self, id: i32) {
        self.id = id;
    }
}

pub fn store() -> MemoryStore {
    MemoryStore::new()
        .with_entity::<Marca>()
        .with_entity::<Modelo>()
        .with_entity::<Veiculo>()
        .with_entity::<Tarifa>()
        .with_entity::<Item>()
}

pub fn tarifa(descricao: &str, valor: f64) -> Tarifa {
    Tarifa {
        id: 0,
        descricao: descricao.to_string(),
        valor,
    }
}

/// Repository with `count` committed tariffs named "Tarifa 01".."Tarifa NN"
pub async fn with_tarifas(count: usize) -> Repository<MemoryStore> {
    let mut repo = Repository::new(store());
    let tarifas = (1..=count)
        .map(|n| tarifa(&format!("Tarifa {n:02}"), n as f64 * 1.5))
        .collect();
    assert!(repo.create_range(tarifas).await.unwrap().is_success());
    assert!(repo.save_changes().await.unwrap().is_success());
    repo
}

/// Two brands, three models and four vehicles
pub async fn with_fleet() -> Repository<MemoryStore> {
    let mut repo = Repository::new(store());
    for nome in ["Volvo", "Scania"] {
        let marca = Marca {
            id: 0,
            nome: nome.to_string(),
        };
        assert!(repo.create(marca).await.unwrap().is_success());
    }
    for (nome, marca_id) in [("FH", 1), ("R450", 2), ("VM", 1)] {
        let modelo = Modelo {
            nome: nome.to_string(),
            marca_id,
            ..Modelo::default()
        };
        assert!(repo.create(modelo).await.unwrap().is_success());
    }
    for (placa, ano, modelo_id) in [
        ("ABC1D23", 2019, 2),
        ("QWE4R56", 2022, 1),
        ("ZXC7V89", 2020, 3),
        ("JKL0M12", 2022, 2),
    ] {
        let veiculo = Veiculo {
            id: Uuid::nil(),
            placa: placa.to_string(),
            ano,
            modelo_id,
            modelo: None,
        };
        assert!(repo.create(veiculo).await.unwrap().is_success());
    }
    assert_eq!(repo.save_changes().await.unwrap(), Outcome::Success(9));
    repo
}
